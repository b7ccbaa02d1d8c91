pub mod test_tensor_preparation;
pub mod test_lstm_model;
pub mod test_training;
pub mod test_evaluation;
pub mod test_signal;
