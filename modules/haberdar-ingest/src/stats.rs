/// Stats from an ingest run.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub feeds_fetched: u32,
    pub feeds_failed: u32,
    pub items_seen: u32,
    pub items_already_stored: u32,
    pub items_scraped: u32,
    pub scrape_failures: u32,
    pub embed_failures: u32,
    pub duplicates_rejected: u32,
    pub articles_stored: u32,
    pub store_failures: u32,
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Ingest Run Complete ===")?;
        writeln!(f, "Feeds fetched:    {}", self.feeds_fetched)?;
        writeln!(f, "Feeds failed:     {}", self.feeds_failed)?;
        writeln!(f, "Items seen:       {}", self.items_seen)?;
        writeln!(f, "Already stored:   {}", self.items_already_stored)?;
        writeln!(f, "Pages scraped:    {}", self.items_scraped)?;
        writeln!(f, "Scrape failures:  {}", self.scrape_failures)?;
        writeln!(f, "Embed failures:   {}", self.embed_failures)?;
        writeln!(f, "Duplicates:       {}", self.duplicates_rejected)?;
        writeln!(f, "Articles stored:  {}", self.articles_stored)?;
        writeln!(f, "Store failures:   {}", self.store_failures)
    }
}
