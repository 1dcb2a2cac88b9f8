
mod test_pipeline;
mod test_round_trip;
mod test_scenarios;
