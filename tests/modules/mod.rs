mod scenarios;
mod transformers;
