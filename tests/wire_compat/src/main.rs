fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    //! Golden-byte tests for the parent ↔ child pipe protocol.
    //!
    //! The pipe carries untagged little-endian frames, so the encoding is
    //! frozen: any change to field order, widths, or string framing breaks
    //! child processes built against an older editor. These tests pin the
    //! exact byte layout so an accidental change fails loudly instead of
    //! corrupting a live handshake.

    use dropforge_pipe::{Command, ResultCode, RunConfig};
    use dropforge_protocol::{ModuleParameter, SystemModules};

    /// Builds the expected wire bytes by hand, field by field, so the
    /// fixture cannot share an encoding bug with the code under test.
    #[derive(Default)]
    struct Golden(Vec<u8>);

    impl Golden {
        fn u8(mut self, value: u8) -> Self {
            self.0.push(value);
            self
        }

        fn u16(mut self, value: u16) -> Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn string(mut self, value: &str) -> Self {
            let bytes = value.as_bytes();
            self.0
                .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
            self.0.extend_from_slice(bytes);
            self
        }
    }

    fn sample_config() -> RunConfig {
        RunConfig {
            log_file_path: "/project/testRun.log".into(),
            data_directory: "/project/data".into(),
            overlay_directory: "/project/cache/testrun/overlay".into(),
            config_directory: "/project/cache/testrun/config".into(),
            capture_directory: "/project/cache/testrun/capture".into(),
            script_directory: "/scripts".into(),
            script_version: "1.20".into(),
            game_object: "MyGameApp".into(),
            vfs_path_config: "/config".into(),
            vfs_path_capture: "/capture".into(),
            game_id: "a1b2c3d4".into(),
            window_width: 1280,
            window_height: 720,
            full_screen: false,
            window_title: "Test Run: Example".into(),
            parameters: vec![ModuleParameter {
                module: "graphics".into(),
                name: "logLevel".into(),
                value: "debug".into(),
            }],
            run_arguments: "--trace".into(),
            exclude_patterns: vec!["*.bak".into()],
            required_extensions: vec![".demodel".into(), ".png".into()],
            script_module: "DragonScript".into(),
            script_module_version: "1.20".into(),
            modules: SystemModules {
                graphics: "OpenGL".into(),
                input: "XInput".into(),
                physics: "Bullet".into(),
                animator: "DEAnimator".into(),
                ai: "DEAI".into(),
                crash_recovery: "Basic".into(),
                audio: "OpenAL".into(),
                synthesizer: "DESynth".into(),
                network: "Basic".into(),
                vr: "OpenXR".into(),
            },
        }
    }

    /// Byte-for-byte encoding of [`sample_config`], written out in the
    /// frozen field order.
    fn sample_bytes() -> Vec<u8> {
        Golden::default()
            .string("/project/testRun.log")
            .string("/project/data")
            .string("/project/cache/testrun/overlay")
            .string("/project/cache/testrun/config")
            .string("/project/cache/testrun/capture")
            .string("/scripts")
            .string("1.20")
            .string("MyGameApp")
            .string("/config")
            .string("/capture")
            .string("a1b2c3d4")
            .u16(1280)
            .u16(720)
            .u8(0)
            .string("Test Run: Example")
            .u16(1)
            .string("graphics")
            .string("logLevel")
            .string("debug")
            .string("--trace")
            .u16(1)
            .string("*.bak")
            .u16(2)
            .string(".demodel")
            .string(".png")
            .string("DragonScript")
            .string("1.20")
            .string("OpenGL")
            .string("XInput")
            .string("Bullet")
            .string("DEAnimator")
            .string("DEAI")
            .string("Basic")
            .string("OpenAL")
            .string("DESynth")
            .string("Basic")
            .string("OpenXR")
            .0
    }

    #[test]
    fn run_config_encodes_to_golden_bytes() {
        let mut buf = Vec::new();
        sample_config().write_to(&mut buf).unwrap();
        assert_eq!(buf, sample_bytes(), "run config wire layout changed");
    }

    #[test]
    fn run_config_decodes_from_golden_bytes() {
        let bytes = sample_bytes();
        let decoded = RunConfig::read_from(&mut &bytes[..]).unwrap();
        assert_eq!(decoded, sample_config());
    }

    #[test]
    fn default_config_layout() {
        // 22 empty strings collapse to their length prefixes; the only
        // non-string fields are width, height, and the fullscreen flag.
        let mut buf = Vec::new();
        RunConfig::default().write_to(&mut buf).unwrap();

        let expected = Golden::default()
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .u16(0)
            .u16(0)
            .u8(0)
            .string("")
            .u16(0)
            .string("")
            .u16(0)
            .u16(0)
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .string("")
            .0;
        assert_eq!(buf, expected);
    }

    #[test]
    fn string_framing_is_u16_length_prefixed_little_endian() {
        let mut config = RunConfig::default();
        config.log_file_path = "ab".into();
        let mut buf = Vec::new();
        config.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..4], [0x02, 0x00, b'a', b'b']);
    }

    #[test]
    fn multi_byte_utf8_counts_bytes_not_chars() {
        let mut config = RunConfig::default();
        config.window_title = "spieß".into();
        let mut buf = Vec::new();
        config.write_to(&mut buf).unwrap();
        let decoded = RunConfig::read_from(&mut &buf[..]).unwrap();
        assert_eq!(decoded.window_title, "spieß");
    }

    #[test]
    fn command_codes_are_frozen() {
        let mut buf = Vec::new();
        Command::Quit.write_to(&mut buf).unwrap();
        assert_eq!(buf, [0x00], "Quit must stay byte 0");
    }

    #[test]
    fn result_codes_are_frozen() {
        let mut buf = Vec::new();
        ResultCode::Success.write_to(&mut buf).unwrap();
        ResultCode::Failed.write_to(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x01]);
    }

    #[test]
    fn truncated_config_is_rejected() {
        let bytes = sample_bytes();
        for cut in [0, 1, 2, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                RunConfig::read_from(&mut &bytes[..cut]).is_err(),
                "truncation at {cut} must not decode"
            );
        }
    }
}
