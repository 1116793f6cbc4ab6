use crate::error::Result;
use crate::types::Feature;

/// Destination for produced features (durable storage lives outside this crate)
pub trait FeatureSink {
    fn accept(&mut self, feature: Feature) -> Result<()>;

    /// Flush anything buffered; called once after the last feature
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl FeatureSink for Vec<Feature> {
    fn accept(&mut self, feature: Feature) -> Result<()> {
        self.push(feature);
        Ok(())
    }
}
