/// Unit test suite for the public domain API
mod basic_tests;
mod streak_tests;
