pub use crate::print_output;
pub use crate::util::output::{print_place_details, print_places, print_post, print_posts};
