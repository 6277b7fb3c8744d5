//! Cross-strategy answering tests.
