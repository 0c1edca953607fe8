mod http_image_client;
mod mock_image_client;

pub use http_image_client::HttpImageClient;
pub use mock_image_client::MockImageClient;
