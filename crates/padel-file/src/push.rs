//! Push channel that tails the file store's push log.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use notify::{RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use padel_core::error::{Error, InvalidInputError, PushDecodeError};
use padel_core::{EntityName, PushChannel, PushEvent, Result};

use crate::store::{FileStore, PUSH_LOG, PushLogEntry};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Push channel over a [`FileStore`]'s `push.jsonl`.
///
/// Subscriptions start at the current end of the log, so only records
/// written afterwards are delivered. File system notifications wake the
/// reader; a 500 ms poll covers platforms where they are unreliable.
/// Subscribing spawns onto the current tokio runtime.
#[derive(Debug, Clone)]
pub struct FilePushChannel {
    store: FileStore,
}

impl FilePushChannel {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }
}

impl<T> PushChannel<T> for FilePushChannel
where
    T: DeserializeOwned + Send + 'static,
{
    type Stream = FilePushStream<T>;

    fn subscribe(&self, entity: &EntityName) -> Result<Self::Stream> {
        let root = self.store.root().to_path_buf();
        let log_path = self.store.push_log_path();

        std::fs::create_dir_all(&root).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("Failed to create store directory: {}", e),
            })
        })?;

        let initial_pos = std::fs::metadata(&log_path).map(|m| m.len()).unwrap_or(0);
        let tail = Arc::new(Tail {
            path: log_path,
            entity: entity.clone(),
            position: Mutex::new(initial_pos),
        });

        let (tx, mut rx) = mpsc::unbounded_channel::<Result<PushEvent<T>>>();

        let watcher_tail = Arc::clone(&tail);
        let watcher_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                notify::EventKind::Modify(_) | notify::EventKind::Create(_)
            ) {
                return;
            }
            let is_log = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == PUSH_LOG));
            if is_log {
                watcher_tail.forward(&watcher_tx);
            }
        })
        .map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("Failed to create file watcher: {}", e),
            })
        })?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("Failed to watch directory: {}", e),
                })
            })?;

        tokio::spawn(async move {
            let _watcher = watcher;
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            while !tx.is_closed() {
                interval.tick().await;
                tail.forward(&tx);
            }
            debug!(entity = %tail.entity, "Push log subscriber gone");
        });

        let stream = async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        };

        Ok(FilePushStream {
            inner: Box::pin(stream),
        })
    }
}

/// Stream of push events from a push log.
pub struct FilePushStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<PushEvent<T>>> + Send>>,
}

impl<T> Stream for FilePushStream<T> {
    type Item = Result<PushEvent<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Read position in the push log, shared by the watcher and the poller.
struct Tail {
    path: std::path::PathBuf,
    entity: EntityName,
    position: Mutex<u64>,
}

impl Tail {
    /// Send every complete line written since the last read.
    ///
    /// The position lock is held until the lines are sent, so the watcher
    /// and the poller cannot interleave their batches.
    fn forward<T: DeserializeOwned>(&self, tx: &mpsc::UnboundedSender<Result<PushEvent<T>>>) {
        let mut position = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        let lines = match read_complete_lines(&self.path, *position) {
            Ok((lines, next)) => {
                *position = next;
                lines
            }
            Err(e) => {
                trace!(error = %e, "Push log not readable yet");
                return;
            }
        };

        for line in lines {
            if let Some(event) = decode_line(&self.entity, &line) {
                let _ = tx.send(event);
            }
        }
    }
}

/// Read whole lines from `start`. A trailing partial line is left for the
/// next read. A log shorter than `start` has been truncated and is read
/// from the beginning.
fn read_complete_lines(path: &Path, start: u64) -> std::io::Result<(Vec<String>, u64)> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = if len < start { 0 } else { start };

    file.seek(SeekFrom::Start(start))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;

    let Some(end) = buf.rfind('\n') else {
        return Ok((Vec::new(), start));
    };
    let lines = buf[..end]
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();
    Ok((lines, start + end as u64 + 1))
}

/// Decode a log line into an event for `entity`. Lines for other entities
/// yield `None`.
fn decode_line<T: DeserializeOwned>(entity: &EntityName, line: &str) -> Option<Result<PushEvent<T>>> {
    let entry: PushLogEntry = match serde_json::from_str(line) {
        Ok(entry) => entry,
        Err(e) => {
            return Some(Err(PushDecodeError::Frame {
                frame: line.chars().take(64).collect(),
                reason: e.to_string(),
            }
            .into()));
        }
    };

    if entry.entity != entity.as_str() {
        return None;
    }

    Some(
        serde_json::from_value(entry.data)
            .map(|record| PushEvent::new(entity.clone(), record))
            .map_err(|e| {
                PushDecodeError::Payload {
                    entity: entry.entity,
                    reason: e.to_string(),
                }
                .into()
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use padel_core::DynRecord;
    use std::io::Write;

    #[test]
    fn partial_lines_wait_for_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PUSH_LOG);
        std::fs::write(&path, "{\"a\":1}\n{\"b\":").unwrap();

        let (lines, next) = read_complete_lines(&path, 0).unwrap();
        assert_eq!(lines, vec!["{\"a\":1}"]);
        assert_eq!(next, 8);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "2}}").unwrap();
        let (lines, _) = read_complete_lines(&path, next).unwrap();
        assert_eq!(lines, vec!["{\"b\":2}"]);
    }

    #[test]
    fn truncated_log_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PUSH_LOG);
        std::fs::write(&path, "x\n").unwrap();

        let (lines, next) = read_complete_lines(&path, 100).unwrap();
        assert_eq!(lines, vec!["x"]);
        assert_eq!(next, 2);
    }

    #[test]
    fn concurrent_forwards_keep_log_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PUSH_LOG);
        std::fs::write(&path, "").unwrap();
        let tail = Arc::new(Tail {
            path: path.clone(),
            entity: EntityName::sale(),
            position: Mutex::new(0),
        });
        let (tx, mut rx) = mpsc::unbounded_channel::<Result<PushEvent<DynRecord>>>();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let tail = Arc::clone(&tail);
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        tail.forward(&tx);
                    }
                })
            })
            .collect();

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        for i in 0..500 {
            writeln!(
                file,
                r#"{{"entity":"sale","time":"2024-01-01T00:00:00Z","data":{{"_id":"s1","n":{}}}}}"#,
                i
            )
            .unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        tail.forward(&tx);
        drop(tx);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            let event = event.unwrap();
            seen.push(event.record.field("n").unwrap().as_u64().unwrap());
        }
        assert_eq!(seen, (0..500).collect::<Vec<u64>>());
    }

    #[test]
    fn lines_are_filtered_by_entity() {
        let sale = EntityName::sale();
        let line = r#"{"entity":"user","time":"2024-01-01T00:00:00Z","data":{"_id":"u1"}}"#;
        assert!(decode_line::<DynRecord>(&sale, line).is_none());

        let line = r#"{"entity":"sale","time":"2024-01-01T00:00:00Z","data":{"_id":"s1"}}"#;
        let event = decode_line::<DynRecord>(&sale, line).unwrap().unwrap();
        assert_eq!(event.record.id.as_str(), "s1");
    }

    #[test]
    fn bad_lines_are_decode_errors() {
        let sale = EntityName::sale();
        assert!(matches!(
            decode_line::<DynRecord>(&sale, "garbage"),
            Some(Err(Error::PushDecode(PushDecodeError::Frame { .. })))
        ));

        let line = r#"{"entity":"sale","time":"2024-01-01T00:00:00Z","data":{"total":1}}"#;
        assert!(matches!(
            decode_line::<DynRecord>(&sale, line),
            Some(Err(Error::PushDecode(PushDecodeError::Payload { .. })))
        ));
    }
}
