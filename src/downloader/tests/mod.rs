use super::test_helpers::*;
use super::*;
use crate::types::DownloadOutcome;
use std::path::Path;
use std::sync::Arc;
