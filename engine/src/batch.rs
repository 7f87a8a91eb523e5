use error::HospitalError;
use scylla::client::session::Session;
use scylla::serialize::row::SerializeRow;
use scylla::statement::batch::{Batch, BatchType};
use scylla::statement::prepared::PreparedStatement;
use std::slice::Chunks;
use tracing::{debug, error};

/// Rows per batch, kept below the store's batch size warning threshold.
pub const BATCH_SIZE: usize = 25;

pub fn batches<T>(rows: &[T]) -> Chunks<'_, T> {
    rows.chunks(BATCH_SIZE)
}

/// Receives one chunk of rows at a time and writes it as a single unit.
pub trait BatchSink<T> {
    async fn submit(&mut self, chunk: &[T]) -> Result<(), HospitalError>;
}

/// Submits `rows` in chunks of [`BATCH_SIZE`], one after the other.
///
/// The first failing chunk stops the whole write; chunks already submitted stay written.
/// Returns the number of submitted chunks.
pub async fn write_in_batches<T, S>(sink: &mut S, rows: &[T]) -> Result<usize, HospitalError>
where
    S: BatchSink<T>,
{
    let mut submitted = 0;
    for (index, chunk) in batches(rows).enumerate() {
        if let Err(err) = sink.submit(chunk).await {
            error!("batch {} of {} rows failed: {}", index, chunk.len(), err);
            return Err(err);
        }
        debug!("batch {} with {} rows written", index, chunk.len());
        submitted += 1;
    }
    Ok(submitted)
}

/// Writes chunks as logged batches of one prepared statement.
pub struct PreparedBatch<'a> {
    session: &'a Session,
    statement: &'a PreparedStatement,
}

impl<'a> PreparedBatch<'a> {
    pub fn new(session: &'a Session, statement: &'a PreparedStatement) -> Self {
        PreparedBatch { session, statement }
    }
}

impl<T: SerializeRow> BatchSink<T> for PreparedBatch<'_> {
    async fn submit(&mut self, chunk: &[T]) -> Result<(), HospitalError> {
        let mut batch = Batch::new(BatchType::Logged);
        for _ in chunk {
            batch.append_statement(self.statement.clone());
        }

        self.session
            .batch(&batch, chunk)
            .await
            .map_err(HospitalError::wide_column)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<Vec<usize>>,
        fail_at: Option<usize>,
    }

    impl BatchSink<usize> for Recorder {
        async fn submit(&mut self, chunk: &[usize]) -> Result<(), HospitalError> {
            if self.fail_at == Some(self.chunks.len()) {
                return Err(HospitalError::wide_column("batch too large"));
            }
            self.chunks.push(chunk.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_chunk_sizes() {
        for (len, expected) in [
            (0, vec![]),
            (1, vec![1]),
            (25, vec![25]),
            (26, vec![25, 1]),
            (60, vec![25, 25, 10]),
        ] {
            let rows = (0..len).collect::<Vec<usize>>();
            let sizes = batches(&rows).map(|c| c.len()).collect::<Vec<_>>();
            assert_eq!(sizes, expected, "{} rows", len);
        }
    }

    #[tokio::test]
    async fn test_submits_in_input_order() {
        let rows = (0..60).collect::<Vec<usize>>();
        let mut sink = Recorder::default();

        let submitted = write_in_batches(&mut sink, &rows).await.unwrap();

        assert_eq!(submitted, 3);
        assert_eq!(sink.chunks.concat(), rows);
        assert!(sink.chunks.iter().all(|c| c.len() <= BATCH_SIZE));
        assert_eq!(sink.chunks[2], (50..60).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_input_submits_nothing() {
        let mut sink = Recorder::default();
        let submitted = write_in_batches::<usize, _>(&mut sink, &[]).await.unwrap();

        assert_eq!(submitted, 0);
        assert!(sink.chunks.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_aborts_remaining_batches() {
        let rows = (0..100).collect::<Vec<usize>>();
        let mut sink = Recorder {
            chunks: vec![],
            fail_at: Some(1),
        };

        let res = write_in_batches(&mut sink, &rows).await;

        assert!(matches!(res, Err(HospitalError::WideColumn(_))));
        assert_eq!(sink.chunks.len(), 1);
        assert!(logs_contain("batch 1 of 25 rows failed"));
    }
}
