// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Structured-value sanitization.
//!
//! Walks a [`serde_json::Value`] and removes sensitive data on two axes:
//! entries whose key names a credential-carrying field are replaced wholesale,
//! and every remaining string value runs through the text pipeline.

use serde_json::{Map, Value};

use crate::{redact_text_in_place, REDACTION_MARKER};

/// Key substrings whose values are always replaced, regardless of type.
///
/// Matching is substring-on-lowercased-key, so `user_password_hash` and
/// `ApiKey` both hit. Over-matching (`monkey` contains `key`) is accepted.
pub const SENSITIVE_KEYS: &[&str] = &[
	"password",
	"token",
	"secret",
	"key",
	"api_key",
	"private_key",
	"auth",
	"authorization",
	"session",
	"cookie",
	"credentials",
	"wallet",
	"crypto",
	"payment",
	"card",
	"cvv",
	"pin",
	"ssn",
	"email",
	"phone",
	"address",
	"ip_address",
	"user_agent",
];

const MAX_DEPTH: usize = 128;

fn key_is_sensitive(key: &str) -> bool {
	let lowered = key.to_lowercase();
	SENSITIVE_KEYS.iter().any(|k| lowered.contains(k))
}

/// Sanitizes a JSON value in place.
///
/// Object entries with a sensitive key are replaced by the marker; other
/// string values are redacted; arrays and objects recurse; numbers, booleans
/// and nulls pass through. Depth is capped so maliciously nested input cannot
/// overflow the stack.
pub fn sanitize_value(value: &mut Value) {
	sanitize_value_with_depth(value, 0);
}

fn sanitize_value_with_depth(value: &mut Value, depth: usize) {
	if depth > MAX_DEPTH {
		return;
	}

	match value {
		Value::String(s) => {
			redact_text_in_place(s);
		}
		Value::Array(items) => {
			for item in items {
				sanitize_value_with_depth(item, depth + 1);
			}
		}
		Value::Object(entries) => {
			for (key, entry) in entries.iter_mut() {
				if key_is_sensitive(key) {
					*entry = Value::String(REDACTION_MARKER.to_string());
				} else {
					sanitize_value_with_depth(entry, depth + 1);
				}
			}
		}
		Value::Null | Value::Bool(_) | Value::Number(_) => {}
	}
}

/// Sanitizes a top-level map of fields, returning the sanitized copy.
pub fn sanitize_map(fields: Map<String, Value>) -> Map<String, Value> {
	let mut value = Value::Object(fields);
	sanitize_value(&mut value);
	match value {
		Value::Object(entries) => entries,
		_ => unreachable!("sanitize_value preserves the value kind"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn sensitive_keys_are_replaced_wholesale() {
		let mut value = json!({
			"password": "hunter2",
			"session_token": 12345,
			"Api_Key": ["a", "b"],
			"user": "alice",
		});
		sanitize_value(&mut value);

		assert_eq!(value["password"], REDACTION_MARKER);
		assert_eq!(value["session_token"], REDACTION_MARKER);
		assert_eq!(value["Api_Key"], REDACTION_MARKER);
		assert_eq!(value["user"], "alice");
	}

	#[test]
	fn key_match_is_substring_on_lowercase() {
		assert!(key_is_sensitive("USER_PASSWORD_HASH"));
		assert!(key_is_sensitive("authorization"));
		assert!(key_is_sensitive("monkey"));
		assert!(!key_is_sensitive("count"));
	}

	#[test]
	fn string_values_run_through_text_pipeline() {
		let mut value = json!({
			"note": "reached us from 203.0.113.9 today",
		});
		sanitize_value(&mut value);
		assert_eq!(
			value["note"],
			format!("reached us from {REDACTION_MARKER} today")
		);
	}

	#[test]
	fn nested_objects_and_arrays_recurse() {
		let mut value = json!({
			"outer": {
				"inner": { "client_secret": "abc" },
				"list": ["ok", "bob@example.com", 7],
			}
		});
		sanitize_value(&mut value);

		assert_eq!(value["outer"]["inner"]["client_secret"], REDACTION_MARKER);
		let list = value["outer"]["list"].as_array().unwrap();
		assert_eq!(list[0], "ok");
		assert_eq!(list[1], REDACTION_MARKER);
		assert_eq!(list[2], 7);
	}

	#[test]
	fn scalars_pass_through_unchanged() {
		let mut value = json!({ "count": 42, "enabled": true, "rate": 3.25, "gone": null });
		let original = value.clone();
		sanitize_value(&mut value);
		assert_eq!(value, original);
	}

	#[test]
	fn empty_inputs_are_unchanged() {
		let mut value = json!({});
		sanitize_value(&mut value);
		assert_eq!(value, json!({}));

		let mut value = json!("");
		sanitize_value(&mut value);
		assert_eq!(value, json!(""));
	}

	#[test]
	fn sanitize_is_idempotent() {
		let mut value = json!({
			"password": "hunter2",
			"note": "from 10.1.1.1",
			"nested": { "token": "abc", "msg": "mail bob@example.com" },
		});
		sanitize_value(&mut value);
		let once = value.clone();
		sanitize_value(&mut value);
		assert_eq!(value, once);
	}

	#[test]
	fn deep_nesting_does_not_overflow() {
		fn nested(depth: usize) -> Value {
			if depth == 0 {
				json!("leaf")
			} else {
				json!({ "level": nested(depth - 1) })
			}
		}

		let mut value = nested(300);
		sanitize_value(&mut value);
	}

	#[test]
	fn sanitize_map_preserves_clean_entries() {
		let fields = json!({ "action": "login", "attempts": 3 });
		let map = match fields {
			Value::Object(m) => m,
			_ => unreachable!(),
		};
		let out = sanitize_map(map);
		assert_eq!(out["action"], "login");
		assert_eq!(out["attempts"], 3);
	}
}
