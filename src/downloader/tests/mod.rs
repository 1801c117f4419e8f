use super::test_helpers::{ScriptedSource, comment, page};
use super::*;
use crate::api::PageRequest;
use crate::error::{Error, Warning};
use crate::model::parse_messages;
use tempfile::TempDir;
