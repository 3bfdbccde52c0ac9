pub mod email;
pub mod items;
pub mod proxy;
pub mod ray;

#[cfg(test)]
mod tests;
