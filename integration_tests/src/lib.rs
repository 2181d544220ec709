//! Cross-module scenarios for `province_core` live under `tests/`.
