use tokio::time::{interval, Duration};

use crate::repositories::{downloads::DownloadSlots, session_store::SessionStore};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drops idle sessions and downloads nobody picked up.
pub async fn start_purge_task(
    sessions: SessionStore,
    downloads: DownloadSlots,
    session_ttl: Duration,
    download_ttl: Duration,
) {
    let mut interval = interval(PURGE_INTERVAL);

    loop {
        interval.tick().await;
        run_purge(&sessions, &downloads, session_ttl, download_ttl);
    }
}

pub fn run_purge(
    sessions: &SessionStore,
    downloads: &DownloadSlots,
    session_ttl: Duration,
    download_ttl: Duration,
) -> (usize, usize) {
    let expired_sessions = sessions.purge_idle(session_ttl);
    let expired_downloads = downloads.purge_expired(download_ttl);

    if expired_sessions > 0 || expired_downloads > 0 {
        tracing::info!(
            "Purged {} idle sessions and {} unclaimed downloads",
            expired_sessions,
            expired_downloads
        );
    }

    (expired_sessions, expired_downloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entities::export::SavedFile, repositories::downloads::SaveTarget};

    #[test]
    fn purge_reports_what_it_removed() {
        let sessions = SessionStore::new();
        let downloads = DownloadSlots::new(4);
        sessions.create();
        downloads
            .save(SavedFile {
                file_name: "images.zip".into(),
                content_type: "application/zip".into(),
                bytes: vec![0x50, 0x4b],
            })
            .unwrap();

        let long = Duration::from_secs(3600);
        assert_eq!(run_purge(&sessions, &downloads, long, long), (0, 0));
        assert_eq!(run_purge(&sessions, &downloads, Duration::ZERO, Duration::ZERO), (1, 1));
    }
}
