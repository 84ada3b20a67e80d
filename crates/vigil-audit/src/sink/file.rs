// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::FileSinkConfig;
use crate::error::SinkError;
use crate::record::{format_json_line, LogRecord};
use crate::sink::{LogSink, SinkFilter};

struct FileHandle {
	file: tokio::fs::File,
	written: u64,
}

/// Size- and count-bounded JSON-lines sink.
///
/// Rotates when the next record would push the active file past
/// `max_bytes`: the rename chain shifts `path.1 … path.N` up by one, the
/// oldest backup past `max_backups` is dropped, and a fresh active file is
/// opened.
pub struct RotatingFileSink {
	name: String,
	config: FileSinkConfig,
	filter: SinkFilter,
	handle: Mutex<Option<FileHandle>>,
}

impl RotatingFileSink {
	pub fn new(name: impl Into<String>, config: FileSinkConfig, filter: SinkFilter) -> Self {
		Self {
			name: name.into(),
			config,
			filter,
			handle: Mutex::new(None),
		}
	}

	fn backup_path(&self, index: usize) -> PathBuf {
		let mut os = self.config.path.clone().into_os_string();
		os.push(format!(".{index}"));
		PathBuf::from(os)
	}

	async fn open_handle(&self) -> Result<FileHandle, SinkError> {
		if let Some(parent) = self.config.path.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| SinkError::Transient(format!("failed to create log dir: {e}")))?;
		}

		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.config.path)
			.await
			.map_err(|e| SinkError::Transient(format!("failed to open log file: {e}")))?;

		let written = file
			.metadata()
			.await
			.map(|m| m.len())
			.unwrap_or(0);

		Ok(FileHandle { file, written })
	}

	async fn rotate(&self) -> Result<(), SinkError> {
		if self.config.max_backups == 0 {
			tokio::fs::remove_file(&self.config.path)
				.await
				.map_err(|e| SinkError::Transient(format!("failed to truncate log file: {e}")))?;
			return Ok(());
		}

		// Shift the chain from the oldest backup down; missing links are
		// fine on a fresh chain.
		for index in (1..self.config.max_backups).rev() {
			let _ = tokio::fs::rename(self.backup_path(index), self.backup_path(index + 1)).await;
		}

		tokio::fs::rename(&self.config.path, self.backup_path(1))
			.await
			.map_err(|e| SinkError::Transient(format!("failed to rotate log file: {e}")))
	}
}

#[async_trait]
impl LogSink for RotatingFileSink {
	fn name(&self) -> &str {
		&self.name
	}

	fn filter(&self) -> &SinkFilter {
		&self.filter
	}

	async fn publish(&self, record: Arc<LogRecord>) -> Result<(), SinkError> {
		let line = format_json_line(&record)?;
		let mut guard = self.handle.lock().await;

		if guard.is_none() {
			*guard = Some(self.open_handle().await?);
		}

		let needs_rotation = guard
			.as_ref()
			.is_some_and(|h| h.written > 0 && h.written + line.len() as u64 > self.config.max_bytes);

		if needs_rotation {
			*guard = None;
			self.rotate().await?;
			*guard = Some(self.open_handle().await?);
		}

		let handle = guard
			.as_mut()
			.ok_or_else(|| SinkError::Permanent("file handle not initialized".to_string()))?;

		handle
			.file
			.write_all(line.as_bytes())
			.await
			.map_err(|e| SinkError::Transient(format!("failed to write to log file: {e}")))?;

		handle
			.file
			.flush()
			.await
			.map_err(|e| SinkError::Transient(format!("failed to flush log file: {e}")))?;

		handle.written += line.len() as u64;

		Ok(())
	}
}
