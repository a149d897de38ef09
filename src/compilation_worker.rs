use tracing::{debug, error, info};

use crate::{
    compiler,
    config::CompilerSettings,
    models::{CompileResult, CompileStatus, Job},
};

pub async fn worker(i: usize, rx: async_channel::Receiver<Job>, settings: CompilerSettings) {
    info!("Worker {i} started");

    while let Ok(job) = rx.recv().await {
        debug!("Worker {i} received job {}", job.id);

        let id = job.id;
        let result = match compiler::compile(&settings, id, &job.source).await {
            Ok(res) => res,
            Err(e) => {
                error!("Worker {i} failed to execute job {id}: {e}");
                CompileResult {
                    status: CompileStatus::Failed { exit_code: None },
                    output: format!("Fatal execution error: {e}"),
                }
            }
        };

        if job.reply.send(result).is_err() {
            debug!("Worker {i}: client for job {id} went away before the result was ready");
        } else {
            debug!("Worker {i} completed job {id}");
        }
    }

    info!("Worker {i} shutting down: work queue closed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn spawn_failures_come_back_as_failed_results() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CompilerSettings {
            program: "definitely-not-a-compiler-on-path".to_string(),
            flags: vec![],
            work_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(1),
        };

        let (tx, rx) = async_channel::unbounded();
        let handle = tokio::spawn(worker(0, rx, settings));

        let (reply, result) = oneshot::channel();
        tx.send(Job {
            id: Uuid::new_v4(),
            source: Bytes::from_static(b"int main() {}"),
            reply,
        })
        .await
        .unwrap();

        let result = result.await.unwrap();
        assert_eq!(result.status, CompileStatus::Failed { exit_code: None });
        assert!(result.render().starts_with(
            "Compilation failed with the following errors:\n\n\
             Fatal execution error: Failed to spawn compilation process"
        ));

        // closing the queue stops the worker
        drop(tx);
        handle.await.unwrap();
    }
}
