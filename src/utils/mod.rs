pub mod script_converter;
