mod common;

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::common::sample_draft;
    use ticketdesk::config::{DatabaseConfig, StoreBackend};
    use ticketdesk::db::{self, DuckDbTicketStore};
    use ticketdesk::open_store;
    use ticketdesk::protocol::{Category, Priority};
    use ticketdesk::store::{TicketStatus, TicketStore};

    // In memory database just for tests
    fn get_test_store() -> DuckDbTicketStore {
        DuckDbTicketStore::new(db::open_in_memory().unwrap())
    }

    #[test]
    fn test_ticket_lifecycle() {
        let store = get_test_store();

        // 1. Create
        let ticket = store.create(sample_draft("Export broken")).unwrap();
        assert_eq!(ticket.status, TicketStatus::Backlog);

        // 2. Get round-trips every field
        let fetched = store.get(ticket.id).unwrap().unwrap();
        assert_eq!(fetched.id, ticket.id);
        assert_eq!(fetched.user_name, "Ada Lovelace");
        assert_eq!(fetched.category, Category::BugReport);
        assert_eq!(fetched.priority, Priority::Medium);
        assert_eq!(fetched.created_at, ticket.created_at);

        // 3. Move to resolved
        assert!(store.update_status(ticket.id, TicketStatus::Resolved).unwrap());
        let resolved = store.get(ticket.id).unwrap().unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);
        assert!(resolved.updated_at.unwrap() >= resolved.created_at);

        // 4. Unknown id is a no-op
        let before = store.list().unwrap();
        assert!(!store.update_status(Uuid::new_v4(), TicketStatus::Backlog).unwrap());
        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn test_listing_keeps_insertion_order() {
        let store = get_test_store();
        let titles = ["one", "two", "three", "four"];
        let ids: Vec<_> = titles
            .iter()
            .map(|t| store.create(sample_draft(t)).unwrap().id)
            .collect();
        store.update_status(ids[1], TicketStatus::InProgress).unwrap();
        store.update_status(ids[3], TicketStatus::InProgress).unwrap();

        let all: Vec<_> = store.list().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(all, titles);

        let in_progress: Vec<_> = store
            .list_by_status(TicketStatus::InProgress)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(in_progress, vec![ids[1], ids[3]]);
    }

    #[test]
    fn test_categories_from_database() {
        let store = get_test_store();
        let mut feature = sample_draft("Dark mode");
        feature.category = Category::FeatureRequest;

        store.create(feature).unwrap();
        store.create(sample_draft("Crash")).unwrap();

        assert_eq!(
            store.categories().unwrap(),
            vec![Category::FeatureRequest, Category::BugReport]
        );
    }

    #[test]
    fn test_open_store_selects_backend() {
        let config = DatabaseConfig {
            backend: StoreBackend::Duckdb,
            path: ":memory:".to_string(),
        };
        let store = open_store(&config).unwrap();
        store.create(sample_draft("via config")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        let memory = open_store(&DatabaseConfig {
            backend: StoreBackend::Memory,
            path: String::new(),
        })
        .unwrap();
        assert!(memory.list().unwrap().is_empty());
    }
}
