pub mod city_resolver;
pub mod error;
