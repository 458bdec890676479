//! One-shot parallel probing of an address list.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::endpoint::EndpointAddress;
use crate::error::{EntryError, ProbeFailure};
use crate::probe::{ProbeOutcome, Prober, ResultRecord, RoundTrip};

/// Probes every address with at most `concurrency` probes in flight and
/// returns one record per address, in input order.
///
/// Workers share nothing but an atomic cursor: each one claims the next
/// unclaimed index, probes it, and repeats until the list is exhausted.
pub async fn run_batch<H, W>(
    prober: Arc<Prober<H, W>>,
    addresses: Vec<EndpointAddress>,
    concurrency: NonZeroUsize,
) -> Vec<ResultRecord>
where
    H: RoundTrip + 'static,
    W: RoundTrip + 'static,
{
    let addresses: Arc<[EndpointAddress]> = addresses.into();
    let cursor = Arc::new(AtomicUsize::new(0));
    let workers = concurrency.get().min(addresses.len());

    let mut pool = JoinSet::new();
    for worker in 0..workers {
        let prober = prober.clone();
        let addresses = addresses.clone();
        let cursor = cursor.clone();
        pool.spawn(async move {
            let mut completed = Vec::new();
            loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(address) = addresses.get(index) else {
                    break;
                };
                completed.push((index, prober.probe(address).await));
            }
            log::debug!("Batch worker {worker} done after {} probes", completed.len());
            completed
        });
    }

    let mut slots: Vec<Option<ResultRecord>> = vec![None; addresses.len()];
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(completed) => {
                for (index, record) in completed {
                    slots[index] = Some(record);
                }
            }
            Err(e) => log::error!("Batch worker died: {e}"),
        }
    }

    // A slot is only empty if its worker panicked.
    slots
        .into_iter()
        .zip(addresses.iter())
        .map(|(slot, address)| {
            slot.unwrap_or_else(|| {
                ResultRecord::new(
                    address.clone(),
                    ProbeOutcome::Failure(ProbeFailure::transport("Probe task aborted")),
                )
            })
        })
        .collect()
}

/// Validates a caller-supplied JSON value as a list of address strings.
/// Nothing is probed unless the whole list is well formed.
pub fn parse_endpoints(value: &Value) -> Result<Vec<EndpointAddress>, EntryError> {
    let items = value.as_array().ok_or(EntryError::NotAList)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(EndpointAddress::from)
                .ok_or(EntryError::NonStringEntry { index })
        })
        .collect()
}

/// Batch entry point for JSON callers: either every record, or the reason the
/// request was rejected.
pub async fn run_batch_json<H, W>(
    prober: Arc<Prober<H, W>>,
    endpoints: &Value,
    concurrency: NonZeroUsize,
) -> Result<Vec<ResultRecord>, EntryError>
where
    H: RoundTrip + 'static,
    W: RoundTrip + 'static,
{
    let addresses = parse_endpoints(endpoints)?;
    Ok(run_batch(prober, addresses, concurrency).await)
}

/// Response envelope of a batch request.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ResultRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Vec<ResultRecord>, EntryError>> for BatchResponse {
    fn from(result: Result<Vec<ResultRecord>, EntryError>) -> Self {
        match result {
            Ok(records) => BatchResponse {
                success: true,
                data: Some(records),
                error: None,
            },
            Err(e) => BatchResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Handles a request body of the form `{"endpoints": [...]}`.
pub async fn handle_batch_request<H, W>(
    prober: Arc<Prober<H, W>>,
    body: &Value,
    concurrency: NonZeroUsize,
) -> BatchResponse
where
    H: RoundTrip + 'static,
    W: RoundTrip + 'static,
{
    let endpoints = body.get("endpoints").unwrap_or(&Value::Null);
    run_batch_json(prober, endpoints, concurrency).await.into()
}
