//! Face locating, padded cropping and super-resolution orchestration.
//!
//! Layout follows a domain/infrastructure split per bounded context:
//! `domain` holds traits and pure logic, `infrastructure` the ONNX,
//! subprocess and filesystem adapters behind them.

pub mod detection {
    pub mod domain {
        pub mod crop_geometry;
        pub mod detected_face;
        pub mod face_detector;
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod imaging {
    pub mod image_codec;
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod upscale_face_use_case;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod region;
}

pub mod upscaling {
    pub mod domain {
        pub mod upscaler;
    }
    pub mod infrastructure;
}
