use super::test_helpers::*;
use super::*;
use crate::config::UploadOptions;
use crate::error::{Error, UploadError};
use crate::types::{
    EventKind, NativeUploadState, Platform, UploadEvent, UploadId, UploadResult, UploadStatus,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod reconcile;
