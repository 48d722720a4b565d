/// Key-construction helpers for the Redis backend.
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, entity_id)
    }

    /// Key prefix shared by every document of a collection, as given to `FT.CREATE ... PREFIX`.
    pub fn collection_prefix(&self, collection: &str) -> String {
        format!("{}:{}:", self.prefix, collection)
    }

    /// Claim key for one value of a unique constraint. Holds the owning entity id.
    pub fn unique(&self, collection: &str, constraint: &str, value: &str) -> String {
        format!("{}:unique:{}:{}:{}", self.prefix, collection, constraint, value)
    }

    pub fn index(&self, collection: &str) -> String {
        format!("{}:{}:idx", self.prefix, collection)
    }
}
