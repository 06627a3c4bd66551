mod image_tests;
mod new_tests;
mod shape_tests;
