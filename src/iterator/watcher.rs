use std::{
    sync::{Arc, Weak},
    thread,
};

use crate::{
    iterator::shared::Shared,
    util::Result,
};

/// Spawn a thread that closes the iterator once its external cancellation
/// source fires.
///
/// The thread waits on the iterator's own token, a child of that source, so
/// it also wakes and exits when the iterator is closed for any other reason.
pub(crate) fn spawn(shared: &Arc<Shared>) -> Result<()> {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let token = shared.token.clone();

    thread::Builder::new()
        .name("docrows-cancel".to_string())
        .spawn(move || {
            token.wait();
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if shared.is_closed() || shared.cancellation().is_none() {
                return;
            }
            tracing::debug!("cancellation requested, closing rows iterator");
            shared.close_if_cancelled();
        })?;

    Ok(())
}
