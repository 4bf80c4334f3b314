mod network_integration;
mod queues;
mod scenario_e2e;
mod sim_time;
