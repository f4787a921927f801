use actix_web::{delete, get, patch, post, web, HttpResponse, Result as WebResult};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::models::{ErrorBody, SendMessageRequest, SendMessageResponse, TicketQuery, UpdateStatusRequest};
use crate::dashboard::{self, Board};
use crate::protocol::TicketDraft;
use crate::session::{SessionError, SessionRegistry};
use crate::store::{StoreError, TicketStore};

pub type SharedStore = Arc<dyn TicketStore>;

fn session_error(e: SessionError) -> HttpResponse {
    match e {
        SessionError::NotFound(_) => HttpResponse::NotFound().json(ErrorBody::new(e.to_string())),
        SessionError::Busy | SessionError::NotCleared(_) | SessionError::NoTurnInFlight => {
            HttpResponse::Conflict().json(ErrorBody::new(e.to_string()))
        }
        SessionError::EmptyMessage => HttpResponse::BadRequest().json(ErrorBody::new(e.to_string())),
        SessionError::Model(reason) => HttpResponse::BadGateway()
            .json(ErrorBody::with_details("Failed to process chat request", reason)),
        SessionError::Poisoned | SessionError::TurnAborted(_) => {
            HttpResponse::InternalServerError().json(ErrorBody::new(e.to_string()))
        }
    }
}

fn store_error(e: StoreError) -> HttpResponse {
    error!("Ticket store failure: {}", e);
    HttpResponse::InternalServerError().json(ErrorBody::new(e.to_string()))
}

// --- Sessions ---

#[post("")]
pub async fn create_session(registry: web::Data<SessionRegistry>) -> WebResult<HttpResponse> {
    match registry.create() {
        Ok(snapshot) => Ok(HttpResponse::Created().json(snapshot)),
        Err(e) => Ok(session_error(e)),
    }
}

#[get("/{id}")]
pub async fn get_session(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    match registry.snapshot(id.into_inner()) {
        Ok(snapshot) => Ok(HttpResponse::Ok().json(snapshot)),
        Err(e) => Ok(session_error(e)),
    }
}

#[post("/{id}/messages")]
pub async fn send_message(
    registry: web::Data<SessionRegistry>,
    id: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> WebResult<HttpResponse> {
    let id = id.into_inner();
    let req = req.into_inner();

    match registry.submit(id, &req.content).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(SendMessageResponse {
            role: "assistant",
            content: outcome.reply,
            ticket_created: outcome.ticket.is_some(),
            ticket: outcome.ticket,
        })),
        Err(e) => Ok(session_error(e)),
    }
}

#[post("/{id}/clear-error")]
pub async fn clear_error(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    match registry.clear_error(id.into_inner()) {
        Ok(snapshot) => Ok(HttpResponse::Ok().json(snapshot)),
        Err(e) => Ok(session_error(e)),
    }
}

#[delete("/{id}")]
pub async fn delete_session(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    match registry.remove(id.into_inner()) {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(HttpResponse::NotFound().finish()),
        Err(e) => Ok(session_error(e)),
    }
}

// --- Tickets ---

#[get("")]
pub async fn list_tickets(store: web::Data<SharedStore>, query: web::Query<TicketQuery>) -> WebResult<HttpResponse> {
    let result = match query.status {
        Some(status) => store.list_by_status(status),
        None => store.list(),
    };

    match result {
        Ok(tickets) => Ok(HttpResponse::Ok().json(tickets)),
        Err(e) => Ok(store_error(e)),
    }
}

#[post("")]
pub async fn create_ticket(store: web::Data<SharedStore>, req: web::Json<TicketDraft>) -> WebResult<HttpResponse> {
    let draft = req.into_inner();
    if let Some(field) = draft.first_blank_field() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new(format!("`{}` must not be blank", field))));
    }

    match store.create(draft) {
        Ok(ticket) => Ok(HttpResponse::Created().json(ticket)),
        Err(e) => Ok(store_error(e)),
    }
}

#[get("/{id}")]
pub async fn get_ticket(store: web::Data<SharedStore>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    match store.get(id.into_inner()) {
        Ok(Some(ticket)) => Ok(HttpResponse::Ok().json(ticket)),
        Ok(None) => Ok(HttpResponse::NotFound().finish()),
        Err(e) => Ok(store_error(e)),
    }
}

#[patch("/{id}/status")]
pub async fn update_ticket_status(
    store: web::Data<SharedStore>,
    id: web::Path<Uuid>,
    req: web::Json<UpdateStatusRequest>,
) -> WebResult<HttpResponse> {
    let id = id.into_inner();

    match dashboard::move_ticket(store.get_ref().as_ref(), id, req.status) {
        Ok(true) => match store.get(id) {
            Ok(Some(ticket)) => Ok(HttpResponse::Ok().json(ticket)),
            Ok(None) => Ok(HttpResponse::NotFound().finish()),
            Err(e) => Ok(store_error(e)),
        },
        Ok(false) => Ok(HttpResponse::NotFound().finish()),
        Err(e) => Ok(store_error(e)),
    }
}

// --- Dashboard ---

#[get("/dashboard")]
pub async fn board(store: web::Data<SharedStore>) -> WebResult<HttpResponse> {
    match Board::load(store.get_ref().as_ref()) {
        Ok(board) => Ok(HttpResponse::Ok().json(board)),
        Err(e) => Ok(store_error(e)),
    }
}

#[get("/categories")]
pub async fn categories(store: web::Data<SharedStore>) -> WebResult<HttpResponse> {
    match store.categories() {
        Ok(categories) => Ok(HttpResponse::Ok().json(categories)),
        Err(e) => Ok(store_error(e)),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .service(create_session)
            .service(get_session)
            .service(send_message)
            .service(clear_error)
            .service(delete_session),
    )
    .service(
        web::scope("/tickets")
            .service(list_tickets)
            .service(create_ticket)
            .service(get_ticket)
            .service(update_ticket_status),
    )
    .service(board)
    .service(categories);
}
