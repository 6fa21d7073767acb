// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cache;
pub mod context;
pub mod scanner;
pub mod token;

pub use cache::{CompletionCache, Lookup};
pub use context::{CompletionContext, completion_context};
pub use scanner::{Indicator, ScanState, scan};
pub use token::{Token, tokenize};
