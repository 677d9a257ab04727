pub mod artifact_file;
