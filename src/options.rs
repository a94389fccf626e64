use std::{fmt, sync::Arc};

use crate::{statistics::Statistics, util::CancelToken};

/// Hook run once after an iterator has released its feed.
pub type OnClose = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct RowsOptions {
    pub cancel: Option<CancelToken>, // External cancellation (None = close explicitly only)
    pub statistics: Option<Arc<Statistics>>, // Counters to update (None = disabled)
    pub on_close: Option<OnClose>,
}

impl RowsOptions {
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_statistics(mut self, statistics: Arc<Statistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn with_on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for RowsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowsOptions")
            .field("cancel", &self.cancel)
            .field("statistics", &self.statistics.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
