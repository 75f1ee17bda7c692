use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskshim::errors::{Result, ShimError};
use taskshim::interrupt::{MetadataClient, MetadataResponse};

/// Metadata client that plays back a script of answers.
///
/// Each poll pops the next entry; once the script is exhausted the last
/// entry repeats. `None` entries simulate a transport failure.
pub struct ScriptedMetadataClient {
    script: Mutex<VecDeque<Option<(u16, String)>>>,
    last: Mutex<Option<(u16, String)>>,
    polls: AtomicUsize,
}

impl ScriptedMetadataClient {
    pub fn new(script: Vec<Option<(u16, &str)>>) -> Self {
        let script = script
            .into_iter()
            .map(|entry| entry.map(|(status, body)| (status, body.to_string())))
            .collect();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(Some((404, String::new()))),
            polls: AtomicUsize::new(0),
        }
    }

    /// Nothing pending, forever.
    pub fn quiet() -> Self {
        Self::new(vec![Some((404, "Not found"))])
    }

    /// `quiet_polls` times 404, then a `terminate` notice.
    pub fn terminate_after(quiet_polls: usize) -> Self {
        let mut script = vec![Some((404, "Not found")); quiet_polls];
        script.push(Some((200, r#"{"action":"terminate","time":"2017-09-18T08:22:00Z"}"#)));
        Self::new(script)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Option<(u16, String)> {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(entry) = script.pop_front() {
            *last = entry;
        }
        last.clone()
    }
}

impl MetadataClient for ScriptedMetadataClient {
    fn get<'a>(
        &'a self,
        _url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MetadataResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.next() {
                Some((status, body)) => Ok(MetadataResponse { status, body }),
                None => Err(ShimError::WatcherTransient("connection refused".to_string())),
            }
        })
    }
}
