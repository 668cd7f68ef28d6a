pub mod persistor;
