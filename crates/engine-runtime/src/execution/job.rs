use connectors::sql::base::{destination::DestinationConnector, source::SourceConnector};
use model::execution::settings::CopySettings;
use std::sync::Arc;

/// Everything one copy run needs: resolved settings and the two endpoints.
#[derive(Clone)]
pub struct CopyJob {
    pub settings: Arc<CopySettings>,
    pub source: Arc<dyn SourceConnector>,
    pub destination: Arc<dyn DestinationConnector>,
}

impl CopyJob {
    pub fn new(
        settings: CopySettings,
        source: Arc<dyn SourceConnector>,
        destination: Arc<dyn DestinationConnector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            source,
            destination,
        }
    }
}
