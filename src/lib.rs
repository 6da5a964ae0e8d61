// promptguard-console: a terminal console for a prompt injection
// protection API.
//
// The library holds everything with behavioral weight: the typed HTTP
// contract, the API client with its error normalization, and the three
// interactive flows (single prompt, batch, analytics) with their pure
// aggregation and reshaping logic. The binary is a thin clap dispatcher
// over the console module.

// Configuration loading and management.
pub mod config;
// Client for the prompt injection protection API.
pub mod client;
// Command entry points and text rendering.
pub mod console;
// Interactive flows: single prompt, batch, analytics.
pub mod flows;
// Request and response shapes exchanged with the API.
pub mod types;
