pub mod sam_output;
