//! Field types and the tag vocabularies of the TIFF, Exif, GPS and interoperability directories

macro_rules! tags {
    {
        // Permit arbitrary meta items, which include documentation.
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident($ty:tt) $(unknown(#[$unknown_meta:meta] $unknown_doc:ident))* {
            // Each of the `Name = Val,` permitting documentation.
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        #[repr($ty)]
        pub enum $name {
            $($(#[$ident_attr])* $tag = $val,)*
            $(
                #[$unknown_meta]
                Unknown($ty),
            )*
        }

        impl $name {
            #[inline(always)]
            const fn __from_inner_type(n: $ty) -> Result<Self, $ty> {
                match n {
                    $( $val => Ok($name::$tag), )*
                    n => Err(n),
                }
            }

            #[inline(always)]
            const fn __to_inner_type(&self) -> $ty {
                match *self {
                    $( $name::$tag => $val, )*
                    $( $name::Unknown($unknown_doc) => { $unknown_doc }, )*
                }
            }

            /// The display name, `None` for values outside of the table.
            #[allow(unreachable_patterns)]
            pub const fn name(&self) -> Option<&'static str> {
                match *self {
                    $( $name::$tag => Some(stringify!($tag)), )*
                    _ => None,
                }
            }
        }

        tags!($name, $ty, $($unknown_doc)*);
    };
    // For u16 tags, provide direct inherent primitive conversion methods.
    ($name:tt, u16, $($unknown_doc:ident)*) => {
        impl $name {
            #[inline(always)]
            pub const fn from_u16(val: u16) -> Option<Self> {
                match Self::__from_inner_type(val) {
                    Ok(v) => Some(v),
                    Err(_) => None,
                }
            }

            $(
            #[inline(always)]
            pub const fn from_u16_exhaustive($unknown_doc: u16) -> Self {
                match Self::__from_inner_type($unknown_doc) {
                    Ok(v) => v,
                    Err(_) => $name::Unknown($unknown_doc),
                }
            }
            )*

            #[inline(always)]
            pub const fn to_u16(&self) -> u16 {
                Self::__to_inner_type(self)
            }
        }
    };
}

// Tags of IFD0/IFD1, the TIFF 6.0 fields named by Exif 2.3 plus the three pointers.
tags! {
/// TIFF tags of the primary and thumbnail directories
pub enum Tag(u16) unknown(
    /// A private or extension tag
    unknown
) {
    NewSubfileType = 0x00FE,
    ImageWidth = 0x0100,
    ImageLength = 0x0101,
    BitsPerSample = 0x0102,
    Compression = 0x0103,
    PhotometricInterpretation = 0x0106,
    ImageDescription = 0x010E,
    Make = 0x010F,
    Model = 0x0110,
    StripOffsets = 0x0111,
    Orientation = 0x0112,
    SamplesPerPixel = 0x0115,
    RowsPerStrip = 0x0116,
    StripByteCounts = 0x0117,
    XResolution = 0x011A,
    YResolution = 0x011B,
    PlanarConfiguration = 0x011C,
    ResolutionUnit = 0x0128,
    TransferFunction = 0x012D,
    Software = 0x0131,
    DateTime = 0x0132,
    Artist = 0x013B,
    HostComputer = 0x013C,
    WhitePoint = 0x013E,
    PrimaryChromaticities = 0x013F,
    JPEGInterchangeFormat = 0x0201,
    JPEGInterchangeFormatLength = 0x0202,
    YCbCrCoefficients = 0x0211,
    YCbCrSubSampling = 0x0212,
    YCbCrPositioning = 0x0213,
    ReferenceBlackWhite = 0x0214,
    Copyright = 0x8298,
    ExifIFDPointer = 0x8769,
    GPSInfoIFDPointer = 0x8825,
    InteroperabilityIFDPointer = 0xA005,
}
}

tags! {
/// Tags of the Exif private directory
pub enum ExifTag(u16) unknown(
    /// A maker or vendor tag
    unknown
) {
    ExposureTime = 0x829A,
    FNumber = 0x829D,
    ExposureProgram = 0x8822,
    SpectralSensitivity = 0x8824,
    ISOSpeedRatings = 0x8827,
    OECF = 0x8828,
    SensitivityType = 0x8830,
    ExifVersion = 0x9000,
    DateTimeOriginal = 0x9003,
    DateTimeDigitized = 0x9004,
    OffsetTime = 0x9010,
    OffsetTimeOriginal = 0x9011,
    OffsetTimeDigitized = 0x9012,
    ComponentsConfiguration = 0x9101,
    CompressedBitsPerPixel = 0x9102,
    ShutterSpeedValue = 0x9201,
    ApertureValue = 0x9202,
    BrightnessValue = 0x9203,
    ExposureBiasValue = 0x9204,
    MaxApertureValue = 0x9205,
    SubjectDistance = 0x9206,
    MeteringMode = 0x9207,
    LightSource = 0x9208,
    Flash = 0x9209,
    FocalLength = 0x920A,
    SubjectArea = 0x9214,
    MakerNote = 0x927C,
    UserComment = 0x9286,
    SubSecTime = 0x9290,
    SubSecTimeOriginal = 0x9291,
    SubSecTimeDigitized = 0x9292,
    FlashpixVersion = 0xA000,
    ColorSpace = 0xA001,
    PixelXDimension = 0xA002,
    PixelYDimension = 0xA003,
    RelatedSoundFile = 0xA004,
    InteroperabilityIFDPointer = 0xA005,
    FlashEnergy = 0xA20B,
    SpatialFrequencyResponse = 0xA20C,
    FocalPlaneXResolution = 0xA20E,
    FocalPlaneYResolution = 0xA20F,
    FocalPlaneResolutionUnit = 0xA210,
    SubjectLocation = 0xA214,
    ExposureIndex = 0xA215,
    SensingMethod = 0xA217,
    FileSource = 0xA300,
    SceneType = 0xA301,
    CFAPattern = 0xA302,
    CustomRendered = 0xA401,
    ExposureMode = 0xA402,
    WhiteBalance = 0xA403,
    DigitalZoomRatio = 0xA404,
    FocalLengthIn35mmFilm = 0xA405,
    SceneCaptureType = 0xA406,
    GainControl = 0xA407,
    Contrast = 0xA408,
    Saturation = 0xA409,
    Sharpness = 0xA40A,
    DeviceSettingDescription = 0xA40B,
    SubjectDistanceRange = 0xA40C,
    ImageUniqueID = 0xA420,
    CameraOwnerName = 0xA430,
    BodySerialNumber = 0xA431,
    LensSpecification = 0xA432,
    LensMake = 0xA433,
    LensModel = 0xA434,
    LensSerialNumber = 0xA435,
    Gamma = 0xA500,
}
}

tags! {
/// Tags of the GPS directory
pub enum GpsTag(u16) unknown(
    /// A tag outside of the GPS table
    unknown
) {
    GPSVersionID = 0x0000,
    GPSLatitudeRef = 0x0001,
    GPSLatitude = 0x0002,
    GPSLongitudeRef = 0x0003,
    GPSLongitude = 0x0004,
    GPSAltitudeRef = 0x0005,
    GPSAltitude = 0x0006,
    GPSTimeStamp = 0x0007,
    GPSSatellites = 0x0008,
    GPSStatus = 0x0009,
    GPSMeasureMode = 0x000A,
    GPSDOP = 0x000B,
    GPSSpeedRef = 0x000C,
    GPSSpeed = 0x000D,
    GPSTrackRef = 0x000E,
    GPSTrack = 0x000F,
    GPSImgDirectionRef = 0x0010,
    GPSImgDirection = 0x0011,
    GPSMapDatum = 0x0012,
    GPSDestLatitudeRef = 0x0013,
    GPSDestLatitude = 0x0014,
    GPSDestLongitudeRef = 0x0015,
    GPSDestLongitude = 0x0016,
    GPSDestBearingRef = 0x0017,
    GPSDestBearing = 0x0018,
    GPSDestDistanceRef = 0x0019,
    GPSDestDistance = 0x001A,
    GPSProcessingMethod = 0x001B,
    GPSAreaInformation = 0x001C,
    GPSDateStamp = 0x001D,
    GPSDifferential = 0x001E,
}
}

tags! {
/// Tags of the interoperability directory
pub enum InteropTag(u16) unknown(
    /// A tag outside of the interoperability table
    unknown
) {
    InteroperabilityIndex = 0x0001,
    InteroperabilityVersion = 0x0002,
    RelatedImageFileFormat = 0x1000,
    RelatedImageWidth = 0x1001,
    RelatedImageLength = 0x1002,
}
}

tags! {
/// The type of an IFD entry (a 2 byte field).
///
/// Only the types Exif uses are known. Any other code has no element size and its value is not
/// decoded.
pub enum Type(u16) {
    /// 8-bit unsigned integer
    BYTE = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
    ASCII = 2,
    /// 16-bit unsigned integer
    SHORT = 3,
    /// 32-bit unsigned integer
    LONG = 4,
    /// Fraction stored as two 32-bit unsigned integers
    RATIONAL = 5,
    /// 8-bit byte that may contain anything, depending on the field
    UNDEFINED = 7,
    /// 32-bit signed integer
    SLONG = 9,
    /// Fraction stored as two 32-bit signed integers
    SRATIONAL = 10,
}
}

impl Type {
    /// Size of one element in bytes.
    pub fn byte_len(&self) -> u8 {
        match *self {
            Type::BYTE | Type::ASCII | Type::UNDEFINED => 1,
            Type::SHORT => 2,
            Type::LONG | Type::SLONG => 4,
            Type::RATIONAL | Type::SRATIONAL => 8,
        }
    }

    /// Element size for a raw type code, zero when the code is unknown.
    pub fn element_size(code: u16) -> u8 {
        Type::from_u16(code).map_or(0, |ty| ty.byte_len())
    }

    /// Whether the value is shown as one run of bytes rather than element by element.
    pub(crate) fn is_byte_run(&self) -> bool {
        matches!(self, Type::ASCII | Type::UNDEFINED)
    }
}

/// The tag-name table an IFD is interpreted with.
///
/// All four share the binary layout, only the meaning of the tags differs. Pointers to further
/// directories are only followed from [`Vocabulary::Tiff`] directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Tiff,
    Exif,
    Gps,
    Interop,
}

impl Vocabulary {
    pub fn tag_name(self, tag: u16) -> Option<&'static str> {
        match self {
            Vocabulary::Tiff => Tag::from_u16_exhaustive(tag).name(),
            Vocabulary::Exif => ExifTag::from_u16_exhaustive(tag).name(),
            Vocabulary::Gps => GpsTag::from_u16_exhaustive(tag).name(),
            Vocabulary::Interop => InteropTag::from_u16_exhaustive(tag).name(),
        }
    }

    /// Label prefix of the directories of a chain, numbered from `#0`.
    pub fn directory_label(self) -> &'static str {
        match self {
            Vocabulary::Tiff => "Image File Directory",
            Vocabulary::Exif => "Exif IFD",
            Vocabulary::Gps => "GPS IFD",
            Vocabulary::Interop => "Interoperability IFD",
        }
    }

    /// The vocabulary of the directory that `tag` points to, if it is a sub-IFD pointer here.
    pub fn sub_ifd(self, tag: u16) -> Option<Vocabulary> {
        if self != Vocabulary::Tiff {
            return None;
        }

        match Tag::from_u16(tag)? {
            Tag::ExifIFDPointer => Some(Vocabulary::Exif),
            Tag::GPSInfoIFDPointer => Some(Vocabulary::Gps),
            Tag::InteroperabilityIFDPointer => Some(Vocabulary::Interop),
            _ => None,
        }
    }
}
