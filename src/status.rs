// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use opensky_client::PollState;
use std::collections::VecDeque;

const MAX_DIAGNOSTICS: usize = 50;
const MAX_HISTORY: usize = 60;

/// Consecutive failures before the feed is reported as degraded
const DEGRADED_AFTER_FAILURES: u32 = 3;

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Poll feed status and statistics shown in the status pane
#[derive(Debug, Clone)]
pub struct FeedStatus {
    pub endpoint: String,
    pub poll_state: Option<PollState>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub successful_fetches: u64,
    pub failed_fetches: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    pub aircraft_count: usize,
    /// Aircraft count of recent snapshots, oldest first
    pub aircraft_history: VecDeque<usize>,
    pub diagnostics: VecDeque<DiagnosticMessage>,
}

impl FeedStatus {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            poll_state: None,
            last_success: None,
            last_error: None,
            successful_fetches: 0,
            failed_fetches: 0,
            consecutive_failures: 0,
            aircraft_count: 0,
            aircraft_history: VecDeque::with_capacity(MAX_HISTORY),
            diagnostics: VecDeque::with_capacity(MAX_DIAGNOSTICS),
        }
    }

    /// Apply a poll state transition
    pub fn apply_poll_state(&mut self, state: PollState) {
        match &state {
            PollState::Fetching => {}
            PollState::Idle { aircraft } => {
                self.aircraft_count = *aircraft;
            }
            PollState::Error(error) => {
                self.failed_fetches += 1;
                self.consecutive_failures += 1;
                self.last_error = Some(error.clone());
                self.add_diagnostic(DiagnosticLevel::Error, format!("Fetch failed: {}", error));
                if self.consecutive_failures == DEGRADED_AFTER_FAILURES {
                    self.add_diagnostic(
                        DiagnosticLevel::Warning,
                        format!("Feed degraded: {} failed fetches in a row", self.consecutive_failures),
                    );
                }
            }
        }
        self.poll_state = Some(state);
    }

    /// Record a received snapshot
    pub fn record_snapshot(&mut self, aircraft: usize, at: DateTime<Utc>) {
        if self.consecutive_failures > 0 {
            self.add_diagnostic(
                DiagnosticLevel::Info,
                format!("Feed recovered after {} failed fetches", self.consecutive_failures),
            );
        }
        self.successful_fetches += 1;
        self.consecutive_failures = 0;
        self.aircraft_count = aircraft;
        self.last_success = Some(at);

        if self.aircraft_history.len() >= MAX_HISTORY {
            self.aircraft_history.pop_front();
        }
        self.aircraft_history.push_back(aircraft);
    }

    /// Seconds since the last successful fetch
    pub fn seconds_since_success(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_success.map(|t| (now - t).num_seconds().max(0))
    }

    /// Whether the feed is currently failing
    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures > 0
    }

    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        if self.diagnostics.len() >= MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        });
    }
}
