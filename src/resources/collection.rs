use std::fmt;

/// The document collections exposed over HTTP. Each maps to one JSONB table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Supplies,
    Donations,
    Comments,
    Testimonials,
    Volunteers,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Supplies => "supplies",
            Collection::Donations => "donations",
            Collection::Comments => "comments",
            Collection::Testimonials => "testimonials",
            Collection::Volunteers => "volunteers",
        }
    }

    /// Top-level field whose string value must be unique within the collection.
    pub fn unique_field(self) -> Option<&'static str> {
        match self {
            Collection::Supplies => Some("title"),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
