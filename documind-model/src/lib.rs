//! # documind-model
//!
//! Language-model backends for the DocuMind RAG service.
//!
//! ## Overview
//!
//! This crate defines the [`Llm`] trait, a streaming text-generation
//! interface, together with:
//!
//! - [`GeminiModel`] — Google's Gemini models over the REST SSE API
//! - [`MockLlm`] — a scriptable model for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use documind_model::{Content, GeminiModel, LlmRequest};
//!
//! let model = GeminiModel::from_env().unwrap();
//! let request = LlmRequest::new(vec![Content::new("user").with_text("Hello")]);
//! // let stream = model.generate_stream(request).await?;
//! ```
//!
//! Responses are delivered as a [`LlmResponseStream`]: fragments arrive in
//! order, a backend failure surfaces as an `Err` item, and dropping the
//! stream aborts the underlying request.

pub mod error;
pub mod gemini;
pub mod llm;
pub mod mock;

pub use error::{ModelError, Result};
pub use gemini::GeminiModel;
pub use llm::{Content, GenerateConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream};
pub use mock::MockLlm;
