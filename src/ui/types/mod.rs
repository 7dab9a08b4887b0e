pub mod choices;
