// Aggregator for device-level integration tests in `tests/device/`.

#[path = "device/mock_initiator_test.rs"]
mod mock_initiator_test;

#[path = "device/mock_target_test.rs"]
mod mock_target_test;

#[path = "device/lifecycle_test.rs"]
mod lifecycle_test;
