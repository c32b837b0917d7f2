pub mod request_reader;
pub mod response_writer;
