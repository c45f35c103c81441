pub mod systick;
