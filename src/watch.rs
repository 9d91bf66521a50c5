use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};

/// Spawns a thread holding a `notify` watcher on `path`; every modify, create or
/// remove event sends a unit on the returned channel.
pub fn spawn_config_watcher(path: PathBuf) -> Receiver<()> {
    let (tx, rx) = channel::<()>();
    std::thread::Builder::new()
        .name("nova-config-watch".into())
        .spawn(move || {
            use notify::{EventKind, RecursiveMode, Watcher};
            let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            });
            let mut watcher = match watcher {
                Ok(w) => w,
                Err(e) => {
                    log::warn!("config watcher unavailable: {}", e);
                    return;
                }
            };
            if let Err(e) = watcher.watch(path.as_path(), RecursiveMode::NonRecursive) {
                log::warn!("cannot watch {}: {}", path.display(), e);
                return;
            }
            log::info!("watching {} for filter changes", path.display());
            loop {
                std::thread::sleep(std::time::Duration::from_secs(3600));
            }
        })
        .map_err(|e| log::warn!("config watcher thread failed to start: {}", e))
        .ok();
    rx
}
