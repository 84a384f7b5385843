// Library root
// -----------
// This crate exposes a small library surface for the `spbackup` binary.
//
// Module responsibilities:
// - `config`: environment/argv configuration and the usage text.
// - `decode`: narrow JSON response-field extraction.
// - `scan`: local directory scan that builds the file manifest.
// - `api`: blocking HTTP client for the baclient API, behind the
//   `Transport` seam (sign-on, submit, status, detail, sign-off).
// - `poll`: the wait-for-completion state machine and its policy.
// - `report`: final backup statistics output.
// - `run`: the orchestrator that sequences one whole backup run.
//
// Keeping the orchestrator generic over `Transport` is what lets the
// scenario tests drive a full run against a scripted server.
pub mod api;
pub mod config;
pub mod decode;
pub mod poll;
pub mod report;
pub mod run;
pub mod scan;
