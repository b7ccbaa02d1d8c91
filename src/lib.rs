pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;

pub mod util {
    pub mod feature_engineering;
    pub mod live_data;
    pub mod market_data;
    pub mod pre_processor;
    pub mod synthetic;
}

pub mod lstm {
    pub mod step_1_tensor_preparation;
    pub mod step_2_lstm_cell;
    pub mod step_3_lstm_model_arch;
    pub mod step_4_train_model;
    pub mod step_5_prediction;
    pub mod step_6_evaluation;
    pub mod step_7_signal;
}

pub mod api {
    pub mod error;
    pub mod routes;
    pub mod state;
}

/// Package metadata captured at build time
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[cfg(test)]
pub mod test;
