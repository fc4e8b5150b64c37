pub mod url_builder;
