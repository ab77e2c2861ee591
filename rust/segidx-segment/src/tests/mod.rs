
#[cfg(test)]
mod index_builder;
