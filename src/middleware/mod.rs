pub mod request_counter;
