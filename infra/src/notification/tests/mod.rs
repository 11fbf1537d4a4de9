mod log_transport_tests;
