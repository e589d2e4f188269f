/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! # ms-loaders
//!
//! The ingestion core for CoinGecko market data:
//! - Identifier registry with ticker collision handling and ghost-coin
//!   suppression
//! - Chunked batch fetching with exponential backoff and a hard stop when a
//!   chunk cannot be fetched
//! - Validation of raw price payloads into persistable samples
//! - A sequential pipeline tying the three together

pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod registry;
pub mod transform;

// Re-export commonly used types
pub use error::{FetchError, LoaderError, LoaderResult, RegistryError};
pub use fetcher::{chunk_ids, BatchFetcher, FetchOutcome, PriceSource, DEFAULT_CHUNK_SIZE};
pub use pipeline::{IngestPipeline, IngestSummary, PipelineConfig, SampleSink, TargetSelection};
pub use registry::{
  JsonFileStore, ListingSource, MemoryStore, Registry, RegistryConfig, Resolution, SnapshotStore,
};
pub use transform::{AssetLedger, Transformer, DEFAULT_MAX_PRICE, UNKNOWN_SYMBOL};
