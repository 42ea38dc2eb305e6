use crate::console::ConsoleError;

/// Size of the battery-backed work RAM window at $6000-$7FFF.
pub const SRAM_SIZE: usize = 0x2000;

const INES_MAGIC: &[u8; 4] = b"NES\x1A";
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 0x4000;
const CHR_BANK_LEN: usize = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Cartridge metadata shared between the front-end and the emulation core.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub mapper: u8,
    pub prg_rom_len: usize,
    pub chr_rom_len: usize,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub sram: Vec<u8>,
}

impl Cartridge {
    /// Parse the iNES header of a program image.
    pub fn from_image(data: &[u8]) -> Result<Self, ConsoleError> {
        let header = Header::parse(data)?;
        let expected = header.payload_len();
        if data.len() < expected {
            return Err(ConsoleError::InvalidImage(format!(
                "image truncated: {} bytes, header declares {expected}",
                data.len()
            )));
        }

        Ok(Self {
            mapper: header.mapper(),
            prg_rom_len: header.prg_rom_len(),
            chr_rom_len: header.chr_rom_len(),
            mirroring: header.mirroring(),
            battery: header.has_battery(),
            sram: vec![0; SRAM_SIZE],
        })
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    /// Copy persisted SRAM into the cartridge, keeping the buffer size.
    pub fn load_sram(&mut self, bytes: &[u8]) {
        for (d, s) in self.sram.iter_mut().zip(bytes.iter()) {
            *d = *s;
        }
    }
}

struct Header<'a> {
    data: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, ConsoleError> {
        if data.len() < HEADER_LEN || &data[..4] != INES_MAGIC {
            return Err(ConsoleError::InvalidImage(
                "missing iNES header".to_string(),
            ));
        }
        Ok(Self { data })
    }

    fn flags6(&self) -> u8 {
        self.data[6]
    }

    fn flags7(&self) -> u8 {
        self.data[7]
    }

    fn prg_rom_len(&self) -> usize {
        self.data[4] as usize * PRG_BANK_LEN
    }

    fn chr_rom_len(&self) -> usize {
        self.data[5] as usize * CHR_BANK_LEN
    }

    fn mapper(&self) -> u8 {
        (self.flags7() & 0xF0) | (self.flags6() >> 4)
    }

    fn mirroring(&self) -> Mirroring {
        let flags = self.flags6();
        if flags & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    fn has_battery(&self) -> bool {
        self.flags6() & 0x02 != 0
    }

    fn has_trainer(&self) -> bool {
        self.flags6() & 0x04 != 0
    }

    fn payload_len(&self) -> usize {
        let trainer = if self.has_trainer() { TRAINER_LEN } else { 0 };
        HEADER_LEN + trainer + self.prg_rom_len() + self.chr_rom_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN + PRG_BANK_LEN + CHR_BANK_LEN];
        data[..4].copy_from_slice(INES_MAGIC);
        data[4] = 1;
        data[5] = 1;
        data[6] = flags6;
        data[7] = flags7;
        data
    }

    #[test]
    fn battery_and_mapper_from_flags() {
        let cart = Cartridge::from_image(&image(0x12, 0x40)).unwrap();
        assert!(cart.has_battery());
        assert_eq!(cart.mapper, 0x41);
        assert_eq!(cart.prg_rom_len, PRG_BANK_LEN);
        assert_eq!(cart.chr_rom_len, CHR_BANK_LEN);
        assert_eq!(cart.sram.len(), SRAM_SIZE);
    }

    #[test]
    fn mirroring_bits() {
        let vertical = Cartridge::from_image(&image(0x01, 0)).unwrap();
        assert_eq!(vertical.mirroring, Mirroring::Vertical);
        let four = Cartridge::from_image(&image(0x09, 0)).unwrap();
        assert_eq!(four.mirroring, Mirroring::FourScreen);
        let horizontal = Cartridge::from_image(&image(0x00, 0)).unwrap();
        assert_eq!(horizontal.mirroring, Mirroring::Horizontal);
        assert!(!horizontal.has_battery());
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        let mut data = image(0, 0);
        data[0] = b'X';
        assert!(Cartridge::from_image(&data).is_err());

        let mut trainer = image(0x04, 0);
        trainer.truncate(HEADER_LEN + PRG_BANK_LEN + CHR_BANK_LEN);
        assert!(Cartridge::from_image(&trainer).is_err());
    }

    #[test]
    fn load_sram_keeps_buffer_size() {
        let mut cart = Cartridge::from_image(&image(0x02, 0)).unwrap();
        cart.load_sram(&[0xAA, 0xBB]);
        assert_eq!(&cart.sram[..3], &[0xAA, 0xBB, 0x00]);

        cart.load_sram(&vec![0x11; SRAM_SIZE * 2]);
        assert_eq!(cart.sram.len(), SRAM_SIZE);
        assert!(cart.sram.iter().all(|&b| b == 0x11));
    }
}
